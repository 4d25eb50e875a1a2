compute::criterion_benchmark!(compute_autovec);

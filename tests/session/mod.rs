mod lifecycle_tests;
mod load_test_tests;
mod worker_pool_tests;

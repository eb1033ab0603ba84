mod drainer_test;
mod listener_test;
mod store_test;

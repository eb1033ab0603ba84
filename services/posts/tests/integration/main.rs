mod listener_test;
mod repository_test;
mod router_test;
mod usecase_test;

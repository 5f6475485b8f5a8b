mod common;

mod router_tests;

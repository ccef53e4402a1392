pub(crate) mod call_wrapper;

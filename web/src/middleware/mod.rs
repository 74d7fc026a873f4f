pub(crate) mod request_log;

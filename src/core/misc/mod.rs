pub(crate) mod time_manager;

mod test_aggregator;
mod test_format;
mod test_log_pager;
mod test_reconciler;
mod test_search;
mod test_server;

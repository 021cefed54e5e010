pub mod scrape_handlers;

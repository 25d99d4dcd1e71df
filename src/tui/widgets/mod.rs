pub mod search_field;

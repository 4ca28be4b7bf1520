//! Utility functions for form input and display formatting.

pub mod format;

pub use format::{
    format_cpf, format_date_time, format_phone, format_price, is_valid_email, parse_birth_date,
    truncate_string,
};

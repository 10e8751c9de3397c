pub mod http;
pub mod unmask;

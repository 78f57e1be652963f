pub mod channel;
pub mod token_list;

pub mod options;
pub mod span;
pub mod template;
pub mod token;

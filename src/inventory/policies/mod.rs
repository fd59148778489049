/// Domain policies - business rules applied during result assembly
pub mod scope_precedence;

pub use scope_precedence::ScopePrecedence;

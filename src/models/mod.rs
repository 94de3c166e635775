//! Data models for the library server

pub mod book;
pub mod email;
pub mod loan;
pub mod member;

// Re-export commonly used types
pub use book::Book;
pub use email::{EmailKind, EmailTask};
pub use loan::LoanRequest;
pub use member::{BorrowedBook, Member, MemberClaims, Role};

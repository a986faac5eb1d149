pub mod attachments;
pub mod catalogs;
pub mod concepts;
pub mod expenses;
pub mod reimbursements;
pub mod settings;
pub mod transfers;

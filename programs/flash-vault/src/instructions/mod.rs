
pub mod deposit;
pub mod flash_loan;
pub mod initialize;
pub mod views;
pub mod withdraw;

pub use deposit::*;
pub use flash_loan::*;
pub use initialize::*;
pub use views::*;
pub use withdraw::*;

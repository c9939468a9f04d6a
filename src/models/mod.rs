pub mod forecast;
pub mod insight;
pub mod inventory;
pub mod order;
pub mod returns;
pub mod review;
pub mod series;
pub mod settlement;
pub mod traffic;

pub use forecast::*;
pub use insight::*;
pub use inventory::*;
pub use order::*;
pub use returns::*;
pub use review::*;
pub use series::*;
pub use settlement::*;
pub use traffic::*;

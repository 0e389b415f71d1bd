pub mod continuous;
pub mod health;
pub mod position;
pub mod scan;
pub mod training_data;
pub mod wire;

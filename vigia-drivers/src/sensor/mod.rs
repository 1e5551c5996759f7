//! Sensor drivers

pub mod aht10;
pub mod bh1750;
pub mod mpu6050;

pub use aht10::Aht10;
pub use bh1750::Bh1750;
pub use mpu6050::Mpu6050;

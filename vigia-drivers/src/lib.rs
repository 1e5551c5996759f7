//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in vigia-core for the node's I2C devices:
//!
//! - AHT10 temperature/humidity sensor
//! - BH1750 ambient light sensor
//! - MPU6050 accelerometer
//! - SSD1306 128x64 OLED text display
//!
//! All drivers use the blocking `embedded-hal` 1.0 I2C traits. Sensor
//! drivers do not own their bus; it is lent to them for each read.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod display;
pub mod sensor;

#[cfg(test)]
pub(crate) mod mock;

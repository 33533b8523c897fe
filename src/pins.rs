//! GPIO / peripheral pin assignments for the Climanode board.
//!
//! Single source of truth for pin numbers.  `esp-idf-hal` hands out I2C pins
//! as typed peripherals, so `main` must take the `gpioN` matching these.

// ---------------------------------------------------------------------------
// Single-wire humidity/temperature sensor (DHT22 / AM2302)
// ---------------------------------------------------------------------------

/// Open-drain data line with external 4.7 kOhm pull-up.
pub const DHT_DATA_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// I2C master bus (MAX17048 fuel gauge)
// ---------------------------------------------------------------------------

/// I2C controller number.
pub const I2C_PORT: i32 = 0;
/// I2C data line.
pub const I2C_SDA_GPIO: i32 = 21;
/// I2C clock line.
pub const I2C_SCL_GPIO: i32 = 22;

//! CY27EE16 I2C addresses, register numbers, and port-byte layout.

/// I2C address of the PLL's volatile register file.
pub const CY_I2C_RAM_ADDR: u8 = 210;

/// Clock output enable register.
pub const CLKOE_REG: u8 = 0x09;

/// DIV1N post-divider register.
pub const DIV1_REG: u8 = 0x0C;

/// DIV2 source register.
pub const DIV2_REG: u8 = 0x47;

/// Charge pump / P counter / Q counter register bank (three registers
/// starting here).
pub const PUMP_COUNTERS_REG: u8 = 0x40;

/// Clock source matrix base register.
pub const CLKSRC_REG: u8 = 0x44;

/// Port-byte layout: bits 0..1 are SDA/SCL, bits 2..4 the antenna mux,
/// bits 5..6 the attenuator relays.
pub const PORT_IDLE: u8 = 0x03;
pub const PORT_MUX_MASK: u8 = 0x1C;
pub const PORT_ATT_MASK: u8 = 0x60;
/// Bits preserved when updating the mux (I2C lines and attenuator).
pub const PORT_KEEP_ON_MUX: u8 = 0x63;

//! QR code payloads
//!
//! Layout: `"MT:"` followed by the Base38 encoding of an 88-bit field packed
//! least significant bit first, optionally followed by a TLV structure of
//! vendor and extension data.
//!
//! | Field               | Bits |
//! |---------------------|------|
//! | version             | 3    |
//! | vendor id           | 16   |
//! | product id          | 16   |
//! | commissioning flow  | 2    |
//! | rendezvous info     | 8    |
//! | discriminator       | 12   |
//! | setup PIN code      | 27   |
//! | padding (zero)      | 4    |

mod bits;
pub mod generator;
pub mod parser;

pub use generator::QrCodeGenerator;
pub use parser::QrCodeParser;

pub mod booking;
pub mod conversation;
pub mod corridor;
pub mod intent;
pub mod money;
pub mod pricing;
pub mod vehicle;

pub use booking::{Booking, BookingStatus};
pub use conversation::{ConversationContext, ConversationState, InboundMessage, PartialBooking};
pub use corridor::CorridorDefinition;
pub use intent::{Confirmation, Intent};
pub use money::{Currency, Money};
pub use pricing::{PricingInput, PricingResult};
pub use vehicle::VehicleType;

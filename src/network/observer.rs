//! Observers of structural network changes.

use crate::core::error::{LinkId, ProcessorId};
use crate::core::property::PropertyChange;
use crate::link::property_link::PropertyLink;
use crate::network::connection::Connection;

/// Receives notifications about network changes, synchronously and in the
/// order the changes happen. All methods default to doing nothing.
pub trait NetworkObserver {
    fn processor_added(&mut self, _id: ProcessorId, _name: &str) {}

    fn processor_removed(&mut self, _id: ProcessorId, _name: &str) {}

    fn processor_renamed(&mut self, _id: ProcessorId, _old: &str, _new: &str) {}

    fn connection_added(&mut self, _connection: &Connection) {}

    fn connection_removed(&mut self, _connection: &Connection) {}

    fn link_added(&mut self, _link: &PropertyLink) {}

    fn link_removed(&mut self, _link: LinkId) {}

    /// Called after the property's own observers.
    fn property_changed(&mut self, _change: &PropertyChange) {}
}

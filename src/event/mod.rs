// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Incoming light observations and outgoing monitor events.
//!
//! [`LightEvent`] is what an event source feeds into the monitor.
//! [`MonitorEvent`] is what the monitor broadcasts on its [`EventBus`] for
//! anyone interested in state changes and alerts.

mod event_bus;
mod light_event;
mod monitor_event;

pub use event_bus::EventBus;
pub use light_event::LightEvent;
pub use monitor_event::MonitorEvent;

//! Service registry: maps service ids to type-erased handlers.
//!
//! Populated during a single-threaded setup phase, then consulted once per
//! request by the serve loop. Registering an id that is already present
//! replaces the previous handler.
//!
//! A panic inside a registered callable is caught at dispatch and reported
//! as [`Error::HandlerPanicked`]; the registry stays usable. A callable that
//! panics halfway through mutating its bound object leaves that object as it
//! was at the panic.
//!
//! Objects bound through [`register_method`] / [`register_method_mut`] are
//! borrowed, never owned; the registry's lifetime `'a` cannot exceed theirs.
//!
//! [`register_method`]: ServiceRegistry::register_method
//! [`register_method_mut`]: ServiceRegistry::register_method_mut

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use log::{debug, warn};

use crate::error::{Error, Result};

use super::codec::{Decode, Reader};
use super::envelope::{Reply, Request};
use super::handler::{
    Callable, FnHandler, Handler, Method, MethodHandler, MethodMut, MethodMutHandler,
};

/// Name → handler table.
#[derive(Default)]
pub struct ServiceRegistry<'a> {
    handlers: HashMap<String, Box<dyn Handler + 'a>>,
}

impl<'a> ServiceRegistry<'a> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a free function or closure.
    pub fn register<Args, F>(&mut self, service_id: impl Into<String>, func: F)
    where
        F: Callable<Args> + 'a,
        Args: Decode + 'a,
    {
        self.register_handler(service_id, FnHandler::new(func));
    }

    /// Register a method bound to a shared reference.
    pub fn register_method<O, Args, F>(
        &mut self,
        service_id: impl Into<String>,
        target: &'a O,
        method: F,
    ) where
        O: ?Sized,
        F: Method<O, Args> + 'a,
        Args: Decode + 'a,
    {
        self.register_handler(service_id, MethodHandler::new(target, method));
    }

    /// Register a mutating method bound to an exclusive reference.
    ///
    /// Mutations are visible to the caller once the registry is dropped and
    /// the borrow ends.
    pub fn register_method_mut<O, Args, F>(
        &mut self,
        service_id: impl Into<String>,
        target: &'a mut O,
        method: F,
    ) where
        O: ?Sized,
        F: MethodMut<O, Args> + 'a,
        Args: Decode + 'a,
    {
        self.register_handler(service_id, MethodMutHandler::new(target, method));
    }

    /// Register an already-built handler.
    pub fn register_handler(&mut self, service_id: impl Into<String>, handler: impl Handler + 'a) {
        let service_id = service_id.into();
        if self.handlers.contains_key(&service_id) {
            warn!("registry: replacing handler for '{}'", service_id);
        }
        self.handlers.insert(service_id, Box::new(handler));
    }

    pub fn contains(&self, service_id: &str) -> bool {
        self.handlers.contains_key(service_id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered ids, sorted.
    pub fn service_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Run the handler for `service_id` against an argument cursor.
    ///
    /// On success `output` holds the encoded return value (nothing for a
    /// void-equivalent handler).
    pub fn dispatch(
        &mut self,
        service_id: &str,
        input: &mut Reader<'_>,
        output: &mut Vec<u8>,
    ) -> Result<()> {
        let handler = self
            .handlers
            .get_mut(service_id)
            .ok_or_else(|| Error::UnknownService(service_id.to_owned()))?;

        let start = output.len();
        match panic::catch_unwind(AssertUnwindSafe(|| handler.call(input, output))) {
            Ok(result) => result?,
            Err(payload) => {
                output.truncate(start);
                return Err(Error::HandlerPanicked(panic_message(payload.as_ref())));
            }
        }

        if !input.is_empty() {
            warn!(
                "registry: '{}' left {} trailing argument bytes (shape mismatch?)",
                service_id,
                input.remaining()
            );
        }
        Ok(())
    }

    /// Decode a request envelope, dispatch it, and build the reply.
    ///
    /// Always yields a reply; failures become error replies.
    pub fn handle_request(&mut self, request: &[u8]) -> Reply {
        let Request {
            service_id,
            mut args,
        } = match Request::decode(request) {
            Ok(req) => req,
            Err(e) => {
                warn!("registry: malformed request envelope: {}", e);
                return Reply::from_error(&Error::Decode(e));
            }
        };

        let mut output = Vec::new();
        match self.dispatch(&service_id, &mut args, &mut output) {
            Ok(()) => {
                debug!("registry: '{}' -> {} reply bytes", service_id, output.len());
                Reply::Ok(output)
            }
            Err(e) => {
                warn!("registry: '{}' failed: {}", service_id, e);
                Reply::from_error(&e)
            }
        }
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "<non-string panic payload>".to_owned()
    }
}

// ── Tests ────────────────────────────────────────────────────

// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::any::Any;
use std::collections::HashMap;
use std::mem;

use anyhow::Context;
use anyhow::anyhow;

use crate::config::Configurable;
use crate::config::ErrorItem;
use crate::config::Location;
use crate::config::Trap;

/// Mutable state threaded through a single configuration pass.
///
/// The context holds:
///
/// * an object stack of components built by in-progress actions, pushed when an element opens
///   and popped when it closes;
/// * an object registry of shared collections under well-known keys, so that elements can
///   reference objects built elsewhere in the same document;
/// * the ordered list of [`ErrorItem`]s recorded so far.
///
/// A context is owned by exactly one interpreter and discarded after the pass.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    objects: Vec<Box<dyn Configurable>>,
    registry: HashMap<String, Box<dyn Any>>,
    errors: Vec<ErrorItem>,
    traps: Vec<Box<dyn Trap>>,
    location: Option<Location>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes an object on top of the object stack.
    pub fn push_object<T: Configurable>(&mut self, object: T) {
        self.objects.push(Box::new(object));
    }

    /// Pushes an already boxed object on top of the object stack.
    pub fn push_boxed(&mut self, object: Box<dyn Configurable>) {
        self.objects.push(object);
    }

    /// Pops the object on top of the object stack.
    pub fn pop_object(&mut self) -> Option<Box<dyn Configurable>> {
        self.objects.pop()
    }

    /// Pops the object on top of the stack if it is a `T`, leaving the stack untouched otherwise.
    pub fn pop_object_as<T: Configurable>(&mut self) -> anyhow::Result<Box<T>> {
        match self.objects.last() {
            Some(top) if top.is::<T>() => {}
            Some(top) => {
                return Err(anyhow!(
                    "expected {} on top of the object stack, found {}",
                    short_type_name::<T>(),
                    top.type_label()
                ));
            }
            None => return Err(anyhow!("the object stack is empty")),
        }
        self.objects
            .pop()
            .and_then(|top| top.downcast::<T>())
            .context("the object stack changed while popping")
    }

    /// Returns the object on top of the object stack.
    pub fn peek_object(&self) -> Option<&dyn Configurable> {
        self.objects.last().map(|object| object.as_ref())
    }

    /// Returns the object on top of the object stack, mutably.
    pub fn peek_object_mut(&mut self) -> Option<&mut dyn Configurable> {
        match self.objects.last_mut() {
            Some(object) => Some(object.as_mut()),
            None => None,
        }
    }

    /// Returns the object on top of the stack if it is a `T`.
    pub fn peek_object_as<T: Configurable>(&self) -> Option<&T> {
        self.peek_object()?.downcast_ref::<T>()
    }

    /// Returns the object on top of the stack mutably if it is a `T`.
    pub fn peek_object_as_mut<T: Configurable>(&mut self) -> Option<&mut T> {
        self.peek_object_mut()?.downcast_mut::<T>()
    }

    /// Returns the object at the given index, counting from the bottom of the stack.
    pub fn object(&self, index: usize) -> Option<&dyn Configurable> {
        self.objects.get(index).map(|object| object.as_ref())
    }

    /// Returns the nearest object of type `T`, searching from the top of the stack.
    pub fn find_object_as<T: Configurable>(&self) -> Option<&T> {
        self.objects
            .iter()
            .rev()
            .find_map(|object| object.downcast_ref::<T>())
    }

    /// The number of objects on the stack.
    pub fn object_stack_len(&self) -> usize {
        self.objects.len()
    }

    /// Stores a value in the object registry under the given key, replacing any previous value.
    pub fn insert<T: Any>(&mut self, key: impl Into<String>, value: T) {
        self.registry.insert(key.into(), Box::new(value));
    }

    /// Returns the registry value under the given key if it is a `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.registry.get(key)?.downcast_ref::<T>()
    }

    /// Returns the registry value under the given key mutably if it is a `T`.
    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.registry.get_mut(key)?.downcast_mut::<T>()
    }

    /// Returns the registry value under the given key, inserting a default one if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the key holds a value of another type.
    pub fn get_or_default<T: Any + Default>(&mut self, key: &str) -> anyhow::Result<&mut T> {
        self.registry
            .entry(key.to_string())
            .or_insert_with(|| Box::new(T::default()))
            .downcast_mut::<T>()
            .with_context(|| format!("registry entry '{key}' has an unexpected type"))
    }

    /// Removes and returns the registry value under the given key.
    pub fn remove(&mut self, key: &str) -> Option<Box<dyn Any>> {
        self.registry.remove(key)
    }

    /// Records an error item and forwards it to every attached trap.
    pub fn add_error(&mut self, item: ErrorItem) {
        for trap in &self.traps {
            trap.trap(&item);
        }
        self.errors.push(item);
    }

    /// The error items recorded so far, in order.
    pub fn errors(&self) -> &[ErrorItem] {
        &self.errors
    }

    /// Takes the recorded error items out of the context.
    pub fn take_errors(&mut self) -> Vec<ErrorItem> {
        mem::take(&mut self.errors)
    }

    /// Attaches a diagnostic sink observing error items recorded from now on.
    pub fn add_trap(&mut self, trap: Box<dyn Trap>) {
        self.traps.push(trap);
    }

    /// Detaches and returns every trap.
    pub fn take_traps(&mut self) -> Vec<Box<dyn Trap>> {
        mem::take(&mut self.traps)
    }

    /// The location of the event being interpreted, if known.
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub(crate) fn set_location(&mut self, location: Option<Location>) {
        self.location = location;
    }
}

fn short_type_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

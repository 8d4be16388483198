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

use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;

use anyhow::Context;
use anyhow::anyhow;

use crate::append::Append;
use crate::logger::Dispatch;

/// What to do with a record when the buffer of an [`Async`] appender is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Blocks until the worker catches up.
    Block,
    /// Drops the incoming record.
    DropIncoming,
}

/// A builder to configure and create an [`Async`] appender.
#[derive(Debug)]
pub struct AsyncBuilder {
    thread_name: String,
    dispatches: Vec<Arc<Dispatch>>,
    buffered_lines_limit: Option<usize>,
    overflow: Overflow,
}

impl AsyncBuilder {
    pub fn new(thread_name: impl Into<String>) -> AsyncBuilder {
        AsyncBuilder {
            thread_name: thread_name.into(),
            dispatches: vec![],
            buffered_lines_limit: None,
            overflow: Overflow::Block,
        }
    }

    /// Sets the number of records waiting for the worker. Unbounded by default.
    pub fn buffered_lines_limit(mut self, buffered_lines_limit: Option<usize>) -> Self {
        self.buffered_lines_limit = buffered_lines_limit;
        self
    }

    pub fn overflow(mut self, overflow: Overflow) -> Self {
        self.overflow = overflow;
        self
    }

    /// Adds a dispatch the worker forwards records to.
    pub fn dispatch(mut self, dispatch: Arc<Dispatch>) -> Self {
        self.dispatches.push(dispatch);
        self
    }

    /// Starts the worker thread.
    pub fn build(self) -> anyhow::Result<Async> {
        let Self {
            thread_name,
            dispatches,
            buffered_lines_limit,
            overflow,
        } = self;

        let (sender, receiver) = channel(buffered_lines_limit);
        let worker = Worker {
            receiver,
            dispatches,
        };
        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker.run())
            .context("failed to spawn async appender thread")?;

        Ok(Async {
            overflow,
            state: AsyncState(Some(State { sender, handle })),
        })
    }
}

/// An appender handing records over to a worker thread, which forwards them to other
/// appenders.
///
/// Dropping the appender waits for the worker to drain the pending records.
#[derive(Debug)]
pub struct Async {
    overflow: Overflow,
    state: AsyncState,
}

impl Append for Async {
    fn append(&self, record: &log::Record) -> anyhow::Result<()> {
        let task = Task::Log(OwnedRecord::new(record));
        self.state.send_task(task, self.overflow)
    }

    fn flush(&self) {
        let (done, wait) = mpsc::channel();
        if self.state.send_task(Task::Flush(done), Overflow::Block).is_ok() {
            let _ = wait.recv();
        }
    }
}

enum Task {
    Log(OwnedRecord),
    Flush(mpsc::Sender<()>),
}

#[derive(Debug)]
struct AsyncState(Option<State>);

#[derive(Debug)]
struct State {
    sender: Sender<Task>,
    handle: JoinHandle<()>,
}

impl AsyncState {
    fn send_task(&self, task: Task, overflow: Overflow) -> anyhow::Result<()> {
        let state = self
            .0
            .as_ref()
            .ok_or_else(|| anyhow!("async appender is shut down"))?;

        match overflow {
            Overflow::Block => state
                .sender
                .send(task)
                .map_err(|_| anyhow!("failed to send task to async appender")),
            Overflow::DropIncoming => match state.sender.try_send(task) {
                Ok(()) | Err(mpsc::TrySendError::Full(_)) => Ok(()),
                Err(mpsc::TrySendError::Disconnected(_)) => {
                    Err(anyhow!("failed to send task to async appender"))
                }
            },
        }
    }
}

impl Drop for AsyncState {
    fn drop(&mut self) {
        if let Some(State { sender, handle }) = self.0.take() {
            // the worker stops once every pending task is processed
            drop(sender);
            let _ = handle.join();
        }
    }
}

struct Worker {
    receiver: mpsc::Receiver<Task>,
    dispatches: Vec<Arc<Dispatch>>,
}

impl Worker {
    fn run(self) {
        let Self {
            receiver,
            dispatches,
        } = self;

        while let Ok(task) = receiver.recv() {
            match task {
                Task::Log(record) => record.with_record(|record| {
                    for dispatch in &dispatches {
                        if let Err(err) = dispatch.log(record) {
                            eprintln!("failed to append record to '{}': {err:#}", dispatch.name());
                        }
                    }
                }),
                Task::Flush(done) => {
                    for dispatch in &dispatches {
                        dispatch.flush();
                    }
                    let _ = done.send(());
                }
            }
        }
    }
}

/// A record detached from the borrows of the logging call.
struct OwnedRecord {
    level: log::Level,
    target: String,
    message: String,
    module_path: Option<String>,
    file: Option<String>,
    line: Option<u32>,
    kvs: Vec<(String, String)>,
}

impl OwnedRecord {
    fn new(record: &log::Record) -> Self {
        let mut kvs = vec![];
        let _ = record.key_values().visit(&mut KvCollector(&mut kvs));
        Self {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
            module_path: record.module_path().map(str::to_string),
            file: record.file().map(str::to_string),
            line: record.line(),
            kvs,
        }
    }

    fn with_record<R>(&self, f: impl FnOnce(&log::Record) -> R) -> R {
        f(&log::Record::builder()
            .args(format_args!("{}", self.message))
            .level(self.level)
            .target(&self.target)
            .module_path(self.module_path.as_deref())
            .file(self.file.as_deref())
            .line(self.line)
            .key_values(&self.kvs)
            .build())
    }
}

struct KvCollector<'a>(&'a mut Vec<(String, String)>);

impl<'kvs> log::kv::VisitSource<'kvs> for KvCollector<'_> {
    fn visit_pair(
        &mut self,
        key: log::kv::Key<'kvs>,
        value: log::kv::Value<'kvs>,
    ) -> Result<(), log::kv::Error> {
        self.0.push((key.to_string(), value.to_string()));
        Ok(())
    }
}

fn channel<T>(bound: Option<usize>) -> (Sender<T>, mpsc::Receiver<T>) {
    match bound {
        Some(bound) => {
            let (tx, rx) = mpsc::sync_channel(bound);
            (Sender::Bounded(tx), rx)
        }
        None => {
            let (tx, rx) = mpsc::channel();
            (Sender::Unbounded(tx), rx)
        }
    }
}

enum Sender<T> {
    Unbounded(mpsc::Sender<T>),
    Bounded(mpsc::SyncSender<T>),
}

impl<T> std::fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::Unbounded(tx) => tx.fmt(f),
            Sender::Bounded(tx) => tx.fmt(f),
        }
    }
}

impl<T> Sender<T> {
    fn send(&self, value: T) -> Result<(), mpsc::SendError<T>> {
        match self {
            Sender::Unbounded(s) => s.send(value),
            Sender::Bounded(s) => s.send(value),
        }
    }

    fn try_send(&self, value: T) -> Result<(), mpsc::TrySendError<T>> {
        match self {
            Sender::Unbounded(s) => s
                .send(value)
                .map_err(|e| mpsc::TrySendError::Disconnected(e.0)),
            Sender::Bounded(s) => s.try_send(value),
        }
    }
}

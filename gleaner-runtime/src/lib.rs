//! Tokio runtime plus a process-wide cancellation token.
//!
//! The binary builds one [`GleanerRuntime`], hands its token to the pipeline
//! and lets Ctrl-C (or [`GleanerRuntime::shutdown`]) cancel in-flight calls.

use anyhow::Result;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct GleanerHandle {
    inner: Handle,
    cancel: CancellationToken,
}

pub struct GleanerRuntime {
    runtime: Runtime,
    cancel: CancellationToken,
}

impl GleanerRuntime {
    /// Build a multi-threaded Tokio runtime.
    ///
    /// ```
    /// use gleaner_runtime::GleanerRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = GleanerRuntime::build("doctest-runtime", Some(1))
    ///     .expect("runtime builds");
    /// let value = runtime.block_on(async { 2 + 2 });
    /// assert_eq!(value, 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str, worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(thread_name);

        if let Some(workers) = worker_threads {
            builder.worker_threads(workers.max(1));
        }

        let runtime = builder.build()?;
        Ok(Self {
            runtime,
            cancel: CancellationToken::new(),
        })
    }

    /// Obtain a cloned handle for spawning tasks and sharing cancellation.
    ///
    /// ```
    /// use gleaner_runtime::GleanerRuntime;
    ///
    /// let runtime = GleanerRuntime::build("handle-example", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// assert!(!handle.cancellation().is_cancelled());
    /// ```
    pub fn handle(&self) -> GleanerHandle {
        GleanerHandle {
            inner: self.runtime.handle().clone(),
            cancel: self.cancel.clone(),
        }
    }

    pub fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Cancel the shared token on the first Ctrl-C.
    pub fn cancel_on_ctrl_c(&self) {
        let cancel = self.cancel.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                res = tokio::signal::ctrl_c() => {
                    if let Err(err) = res {
                        tracing::warn!(error = %err, "runtime.ctrl_c.listen_failed");
                        return;
                    }
                    tracing::info!("runtime.ctrl_c");
                    cancel.cancel();
                }
            }
        });
    }

    /// Cancel outstanding work and shut the runtime down gracefully.
    ///
    /// ```
    /// use gleaner_runtime::GleanerRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = GleanerRuntime::build("shutdown-example", Some(1)).unwrap();
    /// let token = runtime.handle().cancellation();
    /// runtime.shutdown(Duration::from_millis(5));
    /// assert!(token.is_cancelled());
    /// ```
    pub fn shutdown(self, graceful: std::time::Duration) {
        self.cancel.cancel();
        self.runtime.shutdown_timeout(graceful);
    }
}

impl GleanerHandle {
    /// Spawn a future onto the shared runtime handle.
    ///
    /// ```
    /// use gleaner_runtime::GleanerRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = GleanerRuntime::build("handle-doctest", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// let task = handle.spawn(async { 21 * 2 });
    /// let result = runtime.block_on(async move { task.await.unwrap() });
    /// assert_eq!(result, 42);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn spawn<F, T>(&self, fut: F) -> JoinHandle<T>
    where
        F: std::future::Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.inner.spawn(fut)
    }

    /// The process-wide token; cancelling it cancels every holder.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// A token cancelled with the process-wide one but cancellable on its own.
    ///
    /// ```
    /// use gleaner_runtime::GleanerRuntime;
    ///
    /// let runtime = GleanerRuntime::build("child-example", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// let child = handle.child_token();
    /// child.cancel();
    /// assert!(child.is_cancelled());
    /// assert!(!handle.cancellation().is_cancelled());
    /// ```
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }
}

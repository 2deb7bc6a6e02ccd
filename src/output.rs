use {
    crate::DeferError,
    futures::future::{self, BoxFuture, FutureExt, Shared},
    std::{
        fmt::{Debug, Formatter, Result as FmtResult},
        future::Future,
        pin::Pin,
        task::{Context, Poll},
    },
};

/// A value that becomes available once its upstream dependencies have resolved.
///
/// An `Output` is a shared future: it can be cloned freely and every clone observes the same result. The work behind
/// it runs at most once, on whichever executor polls it first.
pub struct Output<T> {
    inner: Shared<BoxFuture<'static, Result<T, DeferError>>>,
}

impl<T> Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wrap a future as an output.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, DeferError>> + Send + 'static,
    {
        Self {
            inner: future.boxed().shared(),
        }
    }

    /// An output that is already resolved to `value`.
    pub fn known(value: T) -> Self {
        Self::new(future::ready(Ok(value)))
    }

    /// An output that has already failed.
    pub fn failed(error: DeferError) -> Self {
        Self::new(future::ready(Err(error)))
    }

    /// Run `f` on the resolved value.
    pub fn apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let this = self.clone();
        Output::new(async move { this.await.map(f) })
    }

    /// Run a fallible `f` on the resolved value.
    pub fn try_apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Result<U, DeferError> + Send + 'static,
    {
        let this = self.clone();
        Output::new(async move { f(this.await?) })
    }

    /// Wait for every output, yielding their values in order. The first failure is returned unchanged.
    pub fn all<I>(outputs: I) -> Output<Vec<T>>
    where
        I: IntoIterator<Item = Output<T>>,
    {
        Output::new(future::try_join_all(outputs))
    }

    /// Poll once, returning the result if it is already available.
    pub fn now_or_never(&self) -> Option<Result<T, DeferError>> {
        FutureExt::now_or_never(self.clone())
    }
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Debug> Debug for Output<T> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self.inner.peek() {
            Some(Ok(value)) => write!(f, "Output({:?})", value),
            Some(Err(e)) => write!(f, "Output(Err({:?}))", e),
            None => f.write_str("Output(<pending>)"),
        }
    }
}

impl<T: Clone> Future for Output<T> {
    type Output = Result<T, DeferError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.poll_unpin(cx)
    }
}

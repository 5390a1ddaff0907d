//! Embedding seam: anything that turns text into a dense vector.

use crate::errors::RagError;
use std::{future::Future, pin::Pin};

pub mod gemini;

pub type EmbedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RagError>> + Send + 'a>>;

/// Provider interface for embedding generation.
///
/// Implement this trait to plug in another embedding backend or a test double.
pub trait EmbeddingsProvider: Send + Sync {
    /// Embeds a single text.
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>>;

    /// Embeds `texts`, returning one vector per input in the same order.
    ///
    /// The default calls [`EmbeddingsProvider::embed`] sequentially; backends
    /// with a native batch endpoint should override it.
    fn embed_many<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move {
            let mut out = Vec::with_capacity(texts.len());
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        })
    }
}

/// Enforces a single dimension across a stream of vectors.
///
/// Starts from an expected dimension, or adopts the first vector's length.
#[derive(Clone, Copy, Debug, Default)]
pub struct DimGuard {
    dim: Option<usize>,
}

impl DimGuard {
    pub fn new(expected: Option<usize>) -> Self {
        Self { dim: expected }
    }

    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    pub fn check(&mut self, v: &[f32]) -> Result<(), RagError> {
        if v.is_empty() {
            return Err(RagError::Embedding("provider returned an empty vector".into()));
        }
        match self.dim {
            Some(want) if want != v.len() => Err(RagError::VectorSizeMismatch {
                got: v.len(),
                want,
            }),
            Some(_) => Ok(()),
            None => {
                self.dim = Some(v.len());
                Ok(())
            }
        }
    }
}

// Copyright 2025 eraflo
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

//! Error types returned by [`GraphicsDevice`](super::GraphicsDevice) and the
//! command recording traits.
//!
//! `ResourceError` is the type every device call returns; shader and pipeline
//! failures nest inside it so callers can match on the cause.

use crate::renderer::api::pipeline::RenderPipelineId;
use crate::renderer::api::shader::ShaderModuleId;
use std::fmt;

/// Failure while building or looking up a shader module.
#[derive(Debug)]
pub enum ShaderError {
    /// The backend rejected the WGSL source.
    CompilationError {
        /// Label of the module, empty when none was given.
        label: String,
        /// Compiler output.
        details: String,
    },
    /// No module is registered under this id.
    NotFound {
        /// The unknown id.
        id: ShaderModuleId,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::CompilationError { label, details } => {
                write!(f, "shader '{label}' failed to compile: {details}")
            }
            ShaderError::NotFound { id } => write!(f, "no shader module {id:?}"),
        }
    }
}

impl std::error::Error for ShaderError {}

/// Failure while building a pipeline layout or render pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// A bind group layout named by the pipeline layout is unknown.
    LayoutCreationFailed(String),
    /// A stage references a shader module that does not exist.
    InvalidShaderModuleForPipeline {
        /// The missing module.
        id: ShaderModuleId,
        /// Label of the pipeline being built.
        pipeline_label: Option<String>,
    },
    /// No pipeline is registered under this id.
    InvalidRenderPipeline {
        /// The unknown id.
        id: RenderPipelineId,
    },
    /// A fragment module was given without an entry point.
    MissingEntryPointForFragmentShader {
        /// Label of the pipeline being built.
        pipeline_label: Option<String>,
        /// The fragment module.
        shader_id: ShaderModuleId,
    },
}

fn label_or_unnamed(label: &Option<String>) -> &str {
    label.as_deref().unwrap_or("<unnamed>")
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::LayoutCreationFailed(msg) => {
                write!(f, "cannot build pipeline layout: {msg}")
            }
            PipelineError::InvalidShaderModuleForPipeline { id, pipeline_label } => write!(
                f,
                "pipeline '{}' uses missing shader module {id:?}",
                label_or_unnamed(pipeline_label)
            ),
            PipelineError::InvalidRenderPipeline { id } => {
                write!(f, "no render pipeline {id:?}")
            }
            PipelineError::MissingEntryPointForFragmentShader {
                pipeline_label,
                shader_id,
            } => write!(
                f,
                "pipeline '{}' has fragment module {shader_id:?} but no entry point",
                label_or_unnamed(pipeline_label)
            ),
        }
    }
}

impl std::error::Error for PipelineError {}

/// The error every device and encoder call returns.
#[derive(Debug)]
pub enum ResourceError {
    /// See [`ShaderError`].
    Shader(ShaderError),
    /// See [`PipelineError`].
    Pipeline(PipelineError),
    /// An id does not name a live resource.
    NotFound,
    /// The request cannot be satisfied as described, e.g. a zero-sized texture
    /// or a copy between mismatched formats.
    InvalidDescriptor(String),
    /// The backend reported a failure of its own.
    BackendError(String),
    /// A write or copy reaches past the end of a resource.
    OutOfBounds,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "shader: {err}"),
            ResourceError::Pipeline(err) => write!(f, "pipeline: {err}"),
            ResourceError::NotFound => write!(f, "resource id is not live"),
            ResourceError::InvalidDescriptor(msg) => write!(f, "invalid descriptor: {msg}"),
            ResourceError::BackendError(msg) => write!(f, "backend: {msg}"),
            ResourceError::OutOfBounds => write!(f, "access out of resource bounds"),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            ResourceError::Pipeline(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

impl From<PipelineError> for ResourceError {
    fn from(err: PipelineError) -> Self {
        ResourceError::Pipeline(err)
    }
}

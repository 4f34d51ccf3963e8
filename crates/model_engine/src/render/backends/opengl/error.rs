//! OpenGL error wrapper
//!
//! OpenGL reports failure through side channels: `glGetError` codes and the
//! info logs of shader and program objects. Both are overwritten by later
//! calls, so they are read at the failure site and folded into a [`GlError`].
//! Enrichment returns a new value and never touches the original.

use gl::types::{GLenum, GLint, GLuint};

/// OpenGL failure with operation context and driver diagnostics
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{description}")]
pub struct GlError {
    description: String,
}

/// Result type for OpenGL operations
pub type GlResult<T> = Result<T, GlError>;

impl GlError {
    /// Error carrying only a description
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    /// Copy of this error with driver text appended
    pub fn with_message(&self, message: &str) -> Self {
        let message = message.trim_end_matches(['\0', '\n', ' ']);
        Self {
            description: format!("{}: {}", self.description, message),
        }
    }

    /// Copy of this error with a `glGetError` code appended
    pub fn with_code(&self, code: GLenum) -> Self {
        Self {
            description: format!("{} ({} 0x{:04X})", self.description, error_name(code), code),
        }
    }

    /// Full description including appended detail
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Fail with the pending `glGetError` code, if any
    ///
    /// Drains the whole error queue; the first code is reported.
    pub fn check(operation: &str) -> GlResult<()> {
        // SAFETY: requires a current context, which every caller runs under
        let first = unsafe { gl::GetError() };
        if first == gl::NO_ERROR {
            return Ok(());
        }
        while unsafe { gl::GetError() } != gl::NO_ERROR {}
        Err(Self::new(format!("Failed to {operation}")).with_code(first))
    }

    /// Error for a shader object, with its compile log attached
    pub fn from_shader(shader: GLuint, operation: &str) -> Self {
        Self::new(format!("Failed to {operation}")).with_message(&shader_info_log(shader))
    }

    /// Error for a program object, with its link log attached
    pub fn from_program(program: GLuint, operation: &str) -> Self {
        Self::new(format!("Failed to {operation}")).with_message(&program_info_log(program))
    }
}

/// Symbolic name of a `glGetError` code
pub fn error_name(code: GLenum) -> &'static str {
    match code {
        gl::NO_ERROR => "GL_NO_ERROR",
        gl::INVALID_ENUM => "GL_INVALID_ENUM",
        gl::INVALID_VALUE => "GL_INVALID_VALUE",
        gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
        gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        gl::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        gl::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => "unknown GL error",
    }
}

fn shader_info_log(shader: GLuint) -> String {
    let mut len: GLint = 0;
    unsafe { gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len) };
    read_log(len, |capacity, written, buffer| unsafe {
        gl::GetShaderInfoLog(shader, capacity, written, buffer);
    })
}

fn program_info_log(program: GLuint) -> String {
    let mut len: GLint = 0;
    unsafe { gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len) };
    read_log(len, |capacity, written, buffer| unsafe {
        gl::GetProgramInfoLog(program, capacity, written, buffer);
    })
}

fn read_log<F>(len: GLint, fetch: F) -> String
where
    F: FnOnce(GLint, &mut GLint, *mut gl::types::GLchar),
{
    let capacity = len.max(1);
    let mut buffer = vec![0u8; capacity as usize];
    let mut written: GLint = 0;
    fetch(capacity, &mut written, buffer.as_mut_ptr().cast());
    buffer.truncate(written.clamp(0, capacity) as usize);
    if buffer.is_empty() {
        return "no driver log".to_string();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_message_returns_new_value() {
        let original = GlError::new("Failed to compile vertex shader");
        let enriched = original.with_message("0:12(3): error: syntax error\n\0");

        assert_eq!(original.description(), "Failed to compile vertex shader");
        assert_eq!(
            enriched.description(),
            "Failed to compile vertex shader: 0:12(3): error: syntax error"
        );
    }

    #[test]
    fn test_with_code_names_error() {
        let original = GlError::new("Failed to upload texture");
        let enriched = original.with_code(gl::OUT_OF_MEMORY);

        assert_eq!(original.description(), "Failed to upload texture");
        assert!(enriched.description().contains("Failed to upload texture"));
        assert!(enriched.description().contains("GL_OUT_OF_MEMORY"));
        assert!(enriched.description().contains("0x0505"));
    }

    #[test]
    fn test_enrichment_chains() {
        let base = GlError::new("Failed to link program");
        let chained = base.with_code(gl::INVALID_OPERATION).with_message("attribute mismatch");
        assert!(chained.description().starts_with("Failed to link program (GL_INVALID_OPERATION"));
        assert!(chained.to_string().ends_with("attribute mismatch"));
        assert_eq!(base, GlError::new("Failed to link program"));
    }

    #[test]
    fn test_read_log_truncates_to_written() {
        let log = read_log(16, |capacity, written, buffer| {
            assert_eq!(capacity, 16);
            let text = b"bad token";
            unsafe { std::ptr::copy_nonoverlapping(text.as_ptr(), buffer.cast::<u8>(), text.len()) };
            *written = text.len() as GLint;
        });
        assert_eq!(log, "bad token");
    }

    #[test]
    fn test_read_log_empty() {
        assert_eq!(read_log(0, |_, written, _| *written = 0), "no driver log");
    }
}

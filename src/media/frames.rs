use std::io::{ErrorKind, Read};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;
use tracing::debug;

use crate::error::{Result, RecutError};

/// One decoded frame, packed rgb24
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSample {
    pub index: usize,
    pub data: Vec<u8>,
}

/// Sequential reader over ffmpeg's raw video stdout.
///
/// The decoder child is reaped once the stream ends. Dropping the reader
/// early kills the child so no decoder outlives its consumer.
pub struct RawFrameReader {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    frame_size: usize,
    next_index: usize,
}

impl RawFrameReader {
    /// Spawn the decoder command and read frames of `frame_size` bytes
    pub fn spawn(mut cmd: Command, frame_size: usize) -> Result<Self> {
        if frame_size == 0 {
            return Err(RecutError::SourceUnreadable("Frame size is zero".to_string()));
        }

        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RecutError::SourceUnreadable(format!("Failed to start decoder: {}", e)))?;

        let stdout = child.stdout.take();
        // Drain stderr on a side thread so a chatty decoder never blocks on a full pipe
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buffer = String::new();
                let _ = pipe.read_to_string(&mut buffer);
                buffer
            })
        });

        Ok(Self {
            child: Some(child),
            stdout,
            stderr,
            frame_size,
            next_index: 0,
        })
    }

    /// Fill one frame buffer, returning Ok(None) on a clean end of stream
    fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let stdout = match self.stdout.as_mut() {
            Some(stdout) => stdout,
            None => return Ok(None),
        };

        let mut buffer = vec![0u8; self.frame_size];
        let mut filled = 0;
        while filled < self.frame_size {
            match stdout.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(RecutError::Detection(format!(
                        "Failed to read frame {}: {}",
                        self.next_index, e
                    )))
                }
            }
        }

        if filled == self.frame_size {
            Ok(Some(buffer))
        } else if filled == 0 {
            Ok(None)
        } else {
            Err(RecutError::Detection(format!(
                "Truncated frame {}: got {} of {} bytes",
                self.next_index, filled, self.frame_size
            )))
        }
    }

    /// Wait for the decoder and report a failed exit
    fn finish(&mut self) -> Result<()> {
        self.stdout = None;
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if let Some(mut child) = self.child.take() {
            let status = child
                .wait()
                .map_err(|e| RecutError::Detection(format!("Failed to wait for decoder: {}", e)))?;
            debug!("Decoder exited with {} after {} frames", status, self.next_index);

            if !status.success() {
                return Err(RecutError::Detection(format!(
                    "Frame decoding failed: {}",
                    stderr.trim()
                )));
            }
        }

        Ok(())
    }
}

impl Iterator for RawFrameReader {
    type Item = Result<FrameSample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.child.is_none() {
            return None;
        }

        match self.read_frame() {
            Ok(Some(data)) => {
                let index = self.next_index;
                self.next_index += 1;
                Some(Ok(FrameSample { index, data }))
            }
            Ok(None) => self.finish().err().map(Err),
            Err(e) => {
                self.release();
                Some(Err(e))
            }
        }
    }
}

impl RawFrameReader {
    fn release(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RawFrameReader {
    fn drop(&mut self) {
        self.release();
    }
}

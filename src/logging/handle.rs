use tracing_appender::non_blocking::WorkerGuard;

/// Держит ресурсы логирования до конца работы процесса.
///
/// При drop неблокирующий файловый writer дописывает буфер.
#[derive(Default)]
pub struct LoggingHandle {
    _file_guard: Option<WorkerGuard>,
}

impl LoggingHandle {
    pub fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self {
            _file_guard: file_guard,
        }
    }

    pub fn file_enabled(&self) -> bool {
        self._file_guard.is_some()
    }
}

impl std::fmt::Debug for LoggingHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("LoggingHandle")
            .field("file_enabled", &self.file_enabled())
            .finish()
    }
}

use error_stack::Report;
use kernel::KernelError;
use sqlx::migrate::MigrateError;

/// lock_not_available, query_canceled (statement_timeout)
const TIMEOUT_SQLSTATES: [&str; 2] = ["55P03", "57014"];

pub trait ConvertError {
    type Ok;
    fn convert_error(self) -> error_stack::Result<Self::Ok, KernelError>;
}

impl<T> ConvertError for Result<T, sqlx::Error> {
    type Ok = T;
    fn convert_error(self) -> error_stack::Result<T, KernelError> {
        self.map_err(|error| {
            let timed_out = match &error {
                sqlx::Error::PoolTimedOut => true,
                sqlx::Error::Database(database) => database
                    .code()
                    .is_some_and(|code| TIMEOUT_SQLSTATES.iter().any(|state| *state == code)),
                _ => false,
            };
            if timed_out {
                Report::from(error).change_context(KernelError::Timeout)
            } else {
                Report::from(error).change_context(KernelError::Internal)
            }
        })
    }
}

impl<T> ConvertError for Result<T, MigrateError> {
    type Ok = T;
    fn convert_error(self) -> error_stack::Result<T, KernelError> {
        self.map_err(|error| Report::from(error).change_context(KernelError::Internal))
    }
}

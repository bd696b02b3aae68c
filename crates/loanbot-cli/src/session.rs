pub mod session;
pub mod session_file;

#[cfg(test)]
pub mod mock_provider;

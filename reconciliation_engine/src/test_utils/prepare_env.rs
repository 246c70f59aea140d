use log::*;

/// Loads the test environment file, if any, and initialises logging. Call at the top of every
/// integration test.
pub fn prepare_test_env() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::builder().is_test(true).try_init();
    debug!("🚀️ Logging initialised");
}

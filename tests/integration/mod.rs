mod helpers;
mod test_affected;
#[cfg(unix)]
mod test_run;

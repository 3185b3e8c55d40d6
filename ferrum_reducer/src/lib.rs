pub mod api {
    pub mod map;
    pub mod reduce;
}

pub mod config {
    pub mod refinery_config;
}

pub mod core {
    pub mod char_count;
    pub mod encoding;
    pub mod geo;
    pub mod grouped_reducer;
    pub mod job;
    pub mod partition;
}

pub mod framework {
    pub mod errors;
    pub mod refinery;
    pub mod show;
    pub mod source;
}

#[cfg(test)]
mod tests;

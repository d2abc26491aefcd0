pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;

pub mod crypto {
    pub mod password;
    pub mod token;
}

pub mod models {
    pub mod session;
    pub mod snippet;
    pub mod user;
}

pub mod repositories {
    pub mod memory;
    pub mod session;
    pub mod snippet;
    pub mod user;
}

pub mod services {
    pub mod users;
}

pub mod handlers {
    pub mod pages;
    pub mod snippets;
    pub mod users;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod csrf;
    pub mod headers;
    pub mod logging;
    pub mod recover;
    pub mod session;
}

pub mod validation {
    pub mod forms;
    pub mod validator;
}

pub mod render {
    pub mod components;
    pub mod helpers;
    pub mod pages;
    pub mod templates;
}

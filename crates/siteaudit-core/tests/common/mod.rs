pub mod score_server;

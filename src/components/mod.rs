pub mod scoreboard;

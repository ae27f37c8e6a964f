mod game;
mod tournament;

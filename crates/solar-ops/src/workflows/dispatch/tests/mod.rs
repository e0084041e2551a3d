mod common;
mod materials;

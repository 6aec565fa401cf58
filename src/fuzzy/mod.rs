pub mod corrector;

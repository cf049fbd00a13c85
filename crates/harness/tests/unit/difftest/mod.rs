//! Unit tests for differential execution checking.

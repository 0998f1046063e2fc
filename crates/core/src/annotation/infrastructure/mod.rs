pub mod imageproc_drawer;

pub mod detection_drawer;

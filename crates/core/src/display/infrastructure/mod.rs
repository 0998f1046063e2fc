pub mod show_image_display;
